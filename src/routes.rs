mod pull_request;
mod records;

pub use pull_request::post_pull_request_handler;
pub use records::get_records_handler;

use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

use crate::grader::Submission;
use crate::queue::SubmissionQueue;
use crate::store::VerdictSink;

#[derive(Serialize)]
struct ErrorResponse {
    reason: &'static str,
    code: u32,
}
