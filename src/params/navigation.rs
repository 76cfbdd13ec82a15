use thiserror::Error;

/// A URL change requested by the parameter store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCommand {
    pub url: String,
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
}

impl NavigationCommand {
    pub fn push(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            replace: false,
        }
    }

    pub fn replace(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            replace: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("navigation to {url} rejected: {reason}")]
    Rejected { url: String, reason: String },
}

/// Applies navigation commands to whatever owns the address bar
pub trait Navigator {
    fn navigate(&mut self, command: &NavigationCommand) -> Result<(), NavigationError>;
}

/// Session history kept in memory
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    index: usize,
    applied: Vec<NavigationCommand>,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
            applied: Vec::new(),
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every command applied so far, oldest first
    pub fn applied(&self) -> &[NavigationCommand] {
        &self.applied
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }
}

impl Navigator for History {
    fn navigate(&mut self, command: &NavigationCommand) -> Result<(), NavigationError> {
        if !command.url.starts_with('/') {
            return Err(NavigationError::Rejected {
                url: command.url.clone(),
                reason: "not a site-relative URL".to_string(),
            });
        }

        if command.replace {
            self.entries[self.index] = command.url.clone();
        } else {
            self.entries.truncate(self.index + 1);
            self.entries.push(command.url.clone());
            self.index += 1;
        }
        self.applied.push(command.clone());
        Ok(())
    }
}
