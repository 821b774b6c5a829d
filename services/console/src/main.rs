use enrollment_desk_console::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {}", err.operator_message());
        std::process::exit(1);
    }
}
