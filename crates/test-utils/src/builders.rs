#![allow(dead_code)]

use std::path::PathBuf;

use serverun::config::TaskOptions;

/// Builder for `TaskOptions` to simplify test setup.
pub struct TaskOptionsBuilder {
    options: TaskOptions,
}

impl TaskOptionsBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            options: TaskOptions {
                command: command.to_string(),
                args: vec![],
                service_target: None,
                working_directory: PathBuf::from("."),
                watch: false,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.options.args.push(arg.to_string());
        self
    }

    pub fn service(mut self, target: &str) -> Self {
        self.options.service_target = Some(target.to_string());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.working_directory = dir.into();
        self
    }

    pub fn watch(mut self, val: bool) -> Self {
        self.options.watch = val;
        self
    }

    pub fn build(self) -> TaskOptions {
        self.options
    }
}
