use crate::address::AddressResolver;
use std::sync::Arc;

pub struct AppState {
    pub resolver: Arc<AddressResolver>,
}
