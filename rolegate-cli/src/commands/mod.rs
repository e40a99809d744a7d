pub mod callback;
pub mod routes;
pub mod serve;
pub mod session;
pub mod visit;

#[cfg(test)]
mod test_support;

use rolegate_core::guard::GuardDecision;
use rolegate_core::navigation::{NavigationMode, Navigator};

/// Navigator for a terminal: there is no page to change, so print the move
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, to: &str, mode: NavigationMode) {
        println!("{}", navigation_line(to, mode));
    }
}

fn navigation_line(to: &str, mode: NavigationMode) -> String {
    let mode = match mode {
        NavigationMode::Push => "push",
        NavigationMode::Replace => "replace",
    };
    format!("navigate ({}) -> {}", mode, to)
}

/// One-line summary of a guard decision
fn describe(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Wait => "waiting for role".to_string(),
        GuardDecision::Render => "access granted".to_string(),
        GuardDecision::Redirect { to, .. } => format!("redirected to {}", to),
        GuardDecision::Fail(error) if error.is_retryable() => {
            format!("blocked: {} (retry may help)", error.message())
        }
        GuardDecision::Fail(error) => format!("blocked: {}", error.message()),
    }
}
