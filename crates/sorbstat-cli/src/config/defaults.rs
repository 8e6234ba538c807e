pub struct DefaultsConfig {
    pub equilibration_steps: u64,
    pub precision: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            equilibration_steps: 0,
            precision: 5,
        }
    }
}
