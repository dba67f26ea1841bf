use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 数据源不可用时返回给调用方的固定文案（两个端点共用）
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch ayat data";

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 经文数据源不可用（网络、超时、状态码、解析失败或空集合统一归为此类）
    #[error("Failed to fetch ayat data: {0}")]
    DataUnavailable(#[from] SourceError),

    /// 参数校验错误
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 图像渲染错误
    #[error("图像渲染错误: {0}")]
    ImageRendererError(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 经文数据源错误类型
///
/// 仅用于日志区分原因；对外一律折叠为 `AppError::DataUnavailable`。
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum SourceError {
    /// 网络请求错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 超时
    #[error("超时")]
    Timeout,

    /// 上游返回非 2xx 状态码
    #[error("上游状态码异常: {0}")]
    Status(u16),

    /// 响应体无法解析为经文数组
    #[error("JSON 解析错误: {0}")]
    Decode(String),

    /// 经文数组为空
    #[error("经文集合为空")]
    Empty,
}

/// 旧版客户端依赖的错误响应体：`{"error": "..."}`
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Failed to fetch ayat data")]
    pub error: String,
}

/// RFC7807 风格的错误响应（Problem Details）。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Validation Failed")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 422)]
    pub status: u16,

    /// 人类可读的详细信息。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 请求追踪 ID（由 request-id 中间件注入）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DataUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ImageRendererError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::DataUnavailable(_) => "DATA_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::ImageRendererError(_) => "IMAGE_RENDER_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 数据源失败保持旧版契约：固定 JSON 体，不暴露具体原因。
        if let AppError::DataUnavailable(_) = self {
            let body = ErrorBody {
                error: FETCH_FAILED_MESSAGE.to_string(),
            };
            return (status, Json(body)).into_response();
        }

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = err.status() {
            SourceError::Status(status.as_u16())
        } else if err.is_decode() {
            SourceError::Decode(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}
