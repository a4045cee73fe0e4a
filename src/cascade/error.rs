use thiserror::Error;

/// Conditions the engine reports instead of fabricating metric values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    /// No original post matched the source content, so there is no cascade
    /// to measure.
    #[error("no original post matches source content starting with {source_prefix:?}")]
    NotFound { source_prefix: String },

    /// The undirected snapshot splits into several components, so the average
    /// shortest-path length is undefined. `cutoff` is `None` for the full graph.
    #[error("{}", disconnected_message(.cutoff, .components))]
    Disconnected {
        cutoff: Option<i64>,
        components: usize,
    },
}

fn disconnected_message(cutoff: &Option<i64>, components: &usize) -> String {
    match cutoff {
        Some(t) => format!("cascade snapshot at t={t} is disconnected ({components} components)"),
        None => format!("cascade graph is disconnected ({components} components)"),
    }
}

impl CascadeError {
    /// Whether this error only invalidates a single time-series sample.
    pub fn is_sample_local(&self) -> bool {
        matches!(self, CascadeError::Disconnected { .. })
    }

    /// Tag a disconnected-snapshot error with the cutoff it occurred at.
    pub fn at_cutoff(self, t: i64) -> Self {
        match self {
            CascadeError::Disconnected { components, .. } => CascadeError::Disconnected {
                cutoff: Some(t),
                components,
            },
            other => other,
        }
    }
}
