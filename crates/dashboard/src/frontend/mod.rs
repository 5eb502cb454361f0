//! Leptos shell over the session core.
//!
//! Components hold no session logic of their own: they read
//! [`SessionSnapshot`](crate::SessionSnapshot)s and call the store.

pub mod app;
pub mod storage;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(app::App);
}
