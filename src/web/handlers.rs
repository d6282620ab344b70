use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::prompt;
use crate::retry;
use crate::web::models::{ChatRequest, ChatResponse};
use crate::AppState;

// Liveness probe
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok", "service": "trainer-gateway" }))
}

// Chat gateway endpoint
pub async fn chat(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, GatewayError> {
    let request_id = Uuid::new_v4();

    let user_input = body.user_input.trim();
    if user_input.is_empty() {
        return Err(GatewayError::InvalidInput(
            "userInput must be a non-empty string".to_string(),
        ));
    }

    let Some(backend) = &data.backend else {
        error!("[{request_id}] Rejecting chat request: no upstream credential configured");
        return Err(GatewayError::ServiceUnavailable(
            "The assistant service is not configured.".to_string(),
        ));
    };

    let source = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    if !data.admission.try_admit(&source) {
        warn!("[{request_id}] Admission cap exceeded for {source}");
        return Err(GatewayError::AdmissionCapExceeded);
    }

    info!(
        "[{request_id}] Chat request from {source} (mode: {}, tone: {}, history: {} turns)",
        body.mode.as_str(),
        body.tone.as_str(),
        body.history.len()
    );

    let messages = prompt::compose(user_input, body.mode, body.tone, &body.history);
    match retry::run(
        &data.throttle,
        backend.as_ref(),
        &messages,
        body.tone.temperature(),
    )
    .await
    {
        Ok(content) => {
            info!("[{request_id}] Upstream responded with {} characters", content.len());
            Ok(HttpResponse::Ok().json(ChatResponse { content }))
        }
        Err(failure) => {
            // A request the upstream never answered must not count against
            // the source's admission cap.
            if matches!(failure, GatewayError::UpstreamUnreachable(_)) {
                data.admission.release(&source);
            }
            error!("[{request_id}] Chat request failed: {failure:?}");
            Err(failure)
        }
    }
}
