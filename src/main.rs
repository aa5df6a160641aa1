#[macro_use]
extern crate rocket;

use salon_api::services::request_logger::init_tracing;

#[launch]
fn rocket() -> _ {
    init_tracing();
    salon_api::build()
}
