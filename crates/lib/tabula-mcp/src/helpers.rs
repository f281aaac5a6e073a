use std::borrow::Cow;

use rmcp::ErrorData;
use rmcp::model::ErrorCode;
use tabula_core::ControlError;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub(crate) fn map_err(err: ControlError) -> ErrorData {
    let code = match &err {
        ControlError::NotFound(_) => ErrorCode::RESOURCE_NOT_FOUND,
        ControlError::InvalidIdentifier(_) => ErrorCode::INVALID_PARAMS,
        _ => ErrorCode::INTERNAL_ERROR,
    };
    mcp_err(code, err.to_string())
}
