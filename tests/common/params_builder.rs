pub struct MemclitedServerParamsBuilder {
    port: u16,
    memory_limit: Option<u64>,
    workers: Option<usize>,
    connection_limit: Option<u32>,
    shards: Option<u32>,
}

impl MemclitedServerParamsBuilder {
    pub fn new() -> MemclitedServerParamsBuilder {
        MemclitedServerParamsBuilder {
            port: 0,
            memory_limit: None,
            workers: None,
            connection_limit: None,
            shards: None,
        }
    }

    pub fn with_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    #[allow(dead_code)]
    pub fn with_memory_limit(&mut self, bytes: u64) -> &mut Self {
        self.memory_limit = Some(bytes);
        self
    }

    #[allow(dead_code)]
    pub fn with_workers(&mut self, workers: usize) -> &mut Self {
        self.workers = Some(workers);
        self
    }

    #[allow(dead_code)]
    pub fn with_connection_limit(&mut self, limit: u32) -> &mut Self {
        self.connection_limit = Some(limit);
        self
    }

    #[allow(dead_code)]
    pub fn with_shards(&mut self, shards: u32) -> &mut Self {
        self.shards = Some(shards);
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut args = vec![String::from("memclited")];
        args.push(String::from("--port"));
        args.push(self.port.to_string());
        if let Some(memory_limit) = self.memory_limit {
            args.push(String::from("--memory-limit"));
            args.push(format!("{}B", memory_limit));
        }
        if let Some(workers) = self.workers {
            args.push(String::from("--workers"));
            args.push(workers.to_string());
        }
        if let Some(connection_limit) = self.connection_limit {
            args.push(String::from("--connection-limit"));
            args.push(connection_limit.to_string());
        }
        if let Some(shards) = self.shards {
            args.push(String::from("--shards"));
            args.push(shards.to_string());
        }
        args
    }
}

impl Default for MemclitedServerParamsBuilder {
    fn default() -> Self {
        MemclitedServerParamsBuilder::new()
    }
}
