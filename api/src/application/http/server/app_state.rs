use std::sync::Arc;

use foodscanner_core::application::FoodScannerService;

use crate::args::Args;

#[derive(Clone)]
pub struct AppState {
    pub args: Arc<Args>,
    pub service: FoodScannerService,
}

impl AppState {
    pub fn new(args: Arc<Args>, service: FoodScannerService) -> Self {
        Self { args, service }
    }
}
