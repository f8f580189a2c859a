use courier_application::ActionDispatchService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub action_dispatch_service: ActionDispatchService,
}
