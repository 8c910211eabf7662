pub struct DefaultsConfig {
    pub eps: String,
    pub order: usize,
    pub time_start: f64,
    pub time_stop: f64,
    pub time_steps: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            eps: "eps".to_string(),
            order: 1,
            time_start: 0.0,
            time_stop: 1.0,
            time_steps: 10,
        }
    }
}
