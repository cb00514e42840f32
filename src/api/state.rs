use crate::scan::Scanner;

#[derive(Clone)]
pub struct AppState {
    pub scanner: Scanner,
}

impl AppState {
    pub fn new(scanner: Scanner) -> Self {
        AppState { scanner }
    }
}
