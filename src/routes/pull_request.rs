use super::*;

/// The slice of a GitHub pull request event we care about. Every other
/// field in the payload is ignored.
#[derive(Deserialize)]
struct PullRequestEvent {
    pull_request: Option<PullRequestInfo>,
}

#[derive(Deserialize)]
struct PullRequestInfo {
    user: Author,
    head: Head,
}

#[derive(Deserialize)]
struct Author {
    login: String,
}

#[derive(Deserialize)]
struct Head {
    #[serde(rename = "ref")]
    branch: String,
    sha: String,
    html_url: String,
    repo: Repo,
}

#[derive(Deserialize)]
struct Repo {
    clone_url: String,
}

/// Webhook receiver. Always answers 204: the sender only needs delivery
/// acknowledged, grading happens later on a worker.
#[post("/pr")]
pub async fn post_pull_request_handler(
    queue: web::Data<SubmissionQueue>,
    body: web::Bytes,
) -> impl Responder {
    let event: PullRequestEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("Undecodable webhook payload, ignoring: {e}");
            return HttpResponse::NoContent().finish();
        }
    };

    let Some(pr) = event.pull_request else {
        log::warn!("Not a pull request, ignoring");
        return HttpResponse::NoContent().finish();
    };

    let submission = Submission {
        user: pr.user.login,
        url: format!("{}/tree/{}", pr.head.html_url, pr.head.sha),
        clone_url: pr.head.repo.clone_url,
        branch: pr.head.branch,
    };

    log::info!("Queued {} by {}", submission.url, submission.user);
    queue.push(submission).await;

    HttpResponse::NoContent().finish()
}
