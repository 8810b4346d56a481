//! 推介接口处理器
//!
//! - POST /pitch - 使用调用方提供的指标、K线、新闻生成推介

use actix_web::{web, HttpResponse, Result};

use crate::models::{normalize_symbol, ApiResponse, PitchInputs, PitchRequest, PitchResponse};
use crate::services::session::{SessionStore, SessionToken};

/// 生成推介并更新会话中保存的结果
///
/// 输入不完整时不生成，返回会话中上一次的推介
pub fn build_pitch_response(
    sessions: &SessionStore,
    token: &SessionToken,
    ticker: String,
    inputs: &PitchInputs,
) -> PitchResponse {
    match inputs.synthesize(&ticker) {
        Some(pitch) => {
            let text = pitch.text();
            sessions.update(&token.0, |s| s.set_last_pitch(text.clone()));
            PitchResponse {
                ticker,
                ready: true,
                pitch: Some(text),
                missing: Vec::new(),
            }
        }
        None => {
            let missing: Vec<String> = inputs.missing().into_iter().map(String::from).collect();
            log::info!("{} 推介输入未就绪，缺少: {}", ticker, missing.join(", "));
            let previous = sessions
                .get(&token.0)
                .and_then(|s| s.last_pitch().map(str::to_string));
            PitchResponse {
                ticker,
                ready: false,
                pitch: previous,
                missing,
            }
        }
    }
}

pub fn pitch_message(response: &PitchResponse) -> String {
    if response.ready {
        "Success".to_string()
    } else {
        format!("Pitch inputs not ready: missing {}", response.missing.join(", "))
    }
}

/// POST /api/v1/pitch
pub async fn compose_pitch(
    sessions: web::Data<SessionStore>,
    token: web::ReqData<SessionToken>,
    body: web::Json<PitchRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let ticker = normalize_symbol(&request.ticker);

    if ticker.is_empty() {
        let response = ApiResponse::<PitchResponse>::error("ticker is required".to_string());
        return Ok(HttpResponse::BadRequest().json(response));
    }

    let result = build_pitch_response(&sessions, &token, ticker, &request.inputs);
    let message = pitch_message(&result);
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/pitch", web::post().to(compose_pitch));
}
