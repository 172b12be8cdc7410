use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("MUX_GATEWAY_TOKEN")
            && !token.trim().is_empty()
        {
            self.mux_gateway_token = Some(token);
        }

        if let Ok(interval_str) = std::env::var("MUX_MEMORY_WRITER_INTERVAL")
            && let Ok(interval) = interval_str.trim().parse::<i64>()
        {
            self.task_settings.memory_writer_interval_messages = Some(interval);
        }
    }
}
