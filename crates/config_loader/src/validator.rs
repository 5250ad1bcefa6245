//! 配置校验模块
//!
//! 校验规则：
//! - backend name 非空且唯一
//! - queue_capacity 若设置，须在 1..=MAX_QUEUE_CAPACITY 之间
//! - console 参数类型正确，不允许未知参数

use std::collections::HashSet;

use contracts::{BackendConfig, BackendType, ContractError, LoggingBlueprint, MAX_QUEUE_CAPACITY};

/// Console 布尔参数
const CONSOLE_BOOL_PARAMS: &[&str] = &[
    "print_parameters",
    "print_user_details",
    "print_user_properties",
    "annotate_priority",
];

/// 校验 LoggingBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &LoggingBlueprint) -> Result<(), ContractError> {
    validate_backend_names(blueprint)?;
    validate_backend_capacities(blueprint)?;
    validate_backend_params(blueprint)?;
    Ok(())
}

/// 校验 backend name 非空且唯一
fn validate_backend_names(blueprint: &LoggingBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, backend) in blueprint.backends.iter().enumerate() {
        if backend.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("backends[{idx}].name"),
                "backend name cannot be empty",
            ));
        }
        if !seen.insert(backend.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("backends[name={}]", backend.name),
                "duplicate backend name",
            ));
        }
    }
    Ok(())
}

/// 校验 backend 有界队列容量
fn validate_backend_capacities(blueprint: &LoggingBlueprint) -> Result<(), ContractError> {
    for backend in &blueprint.backends {
        let Some(capacity) = backend.queue_capacity else {
            continue;
        };
        if !(1..=MAX_QUEUE_CAPACITY).contains(&capacity) {
            return Err(ContractError::config_validation(
                format!("backends[{}].queue_capacity", backend.name),
                format!("queue_capacity must be between 1 and {MAX_QUEUE_CAPACITY}"),
            ));
        }
    }
    Ok(())
}

/// 校验各类型 backend 的参数
fn validate_backend_params(blueprint: &LoggingBlueprint) -> Result<(), ContractError> {
    for backend in &blueprint.backends {
        match backend.backend_type {
            BackendType::Console => validate_console_params(backend)?,
        }
    }
    Ok(())
}

fn validate_console_params(backend: &BackendConfig) -> Result<(), ContractError> {
    let field = |key: &str| format!("backends[{}].params.{key}", backend.name);

    for key in backend.params.keys() {
        if key != "sink" && !CONSOLE_BOOL_PARAMS.contains(&key.as_str()) {
            return Err(ContractError::config_validation(
                field(key),
                "unknown console parameter",
            ));
        }
    }

    for key in CONSOLE_BOOL_PARAMS {
        backend
            .bool_param(key, true)
            .map_err(|e| ContractError::config_validation(field(key), e.to_string()))?;
    }

    backend
        .sink_param()
        .map_err(|e| ContractError::config_validation(field("sink"), e.to_string()))?;

    Ok(())
}
