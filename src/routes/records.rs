use super::*;

#[get("/records")]
pub async fn get_records_handler(store: web::Data<dyn VerdictSink>) -> impl Responder {
    match store.list().await {
        Ok(records) => {
            log::info!("Got {} verdict records", records.len());
            HttpResponse::Ok().json(records)
        }
        Err(e) => {
            log::error!("Failed to retrieve verdict records: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}
