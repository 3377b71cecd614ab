mod api;
mod components;
mod coords;
mod gesture;
mod notify;
mod otp;
mod pages;
mod pdf;
mod placement;
mod viewport;

use dioxus::prelude::*;

use pages::bulk_sign::BulkSign;
use pages::home::Home;
use pages::self_sign::SelfSign;
use pages::sign::Sign;
use pages::verify::Verify;
use pages::workflow::Workflow;

#[derive(Routable, Clone, PartialEq)]
pub(crate) enum Route {
    #[route("/")]
    Home {},
    #[route("/workflow/:id")]
    Workflow { id: i64 },
    #[route("/sign/:id?:token")]
    Sign { id: i64, token: String },
    #[route("/self-sign")]
    SelfSign {},
    #[route("/bulk-sign")]
    BulkSign {},
    #[route("/verify/:uuid?:sig")]
    Verify { uuid: String, sig: String },
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
