use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub worker_count: usize,
    pub queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8088);

        let worker_count = env::var("WORKER_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(3);

        let queue_capacity = env::var("QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(100);

        Self {
            port,
            worker_count,
            queue_capacity,
        }
    }
}
