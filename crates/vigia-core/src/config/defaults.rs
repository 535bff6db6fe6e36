//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Vigía".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_storage_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

pub fn default_storage_timeout_secs() -> u64 {
    15
}

pub fn default_agent_timeout_secs() -> u64 {
    600
}

pub fn default_poll_interval_secs() -> u64 {
    20
}

pub fn default_error_backoff_secs() -> u64 {
    30
}

pub fn default_trial_days() -> u64 {
    30
}

pub fn default_affirmative_tokens() -> Vec<String> {
    vec![
        "si".to_string(),
        "sí".to_string(),
        "confirmar".to_string(),
        "confirmo".to_string(),
    ]
}

pub fn default_negative_tokens() -> Vec<String> {
    vec![
        "no".to_string(),
        "cancelar".to_string(),
        "cancela".to_string(),
    ]
}

pub fn default_db_path() -> String {
    "~/.vigia/data/vigia.db".to_string()
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    3000
}
