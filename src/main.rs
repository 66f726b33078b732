use portfolio_web::telemetry;
use portfolio_web::ui_dioxus::App;

fn main() {
    telemetry::init();

    // Launch the Dioxus app (desktop by default, `--features web` for the site)
    dioxus::launch(App);
}
