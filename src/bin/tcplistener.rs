//! Accepts a single connection, prints the request it carried, and exits.

use httpwire::config::Config;
use httpwire::http::parser::parse_request;
use httpwire::http::request::Request;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    println!("listening for TCP traffic on {}", listener.local_addr()?);

    let (mut socket, peer) = listener.accept().await?;
    println!("accepted connection from {peer}");

    match parse_request(&mut socket).await {
        Ok(request) => print!("{}", describe(&request)),
        Err(e) => println!("reader error: {e}"),
    }

    println!("closed connection from {peer}");
    Ok(())
}

fn describe(request: &Request) -> String {
    let line = &request.request_line;
    let mut out = format!(
        "Request line:\n- Method: {}\n- Target: {}\n- Version: {}\nHeaders:\n",
        line.method.as_str(),
        line.request_target,
        line.http_version
    );

    let mut headers: Vec<_> = request.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        // curl versions differ between machines
        let value = if name == "user-agent" && value.starts_with("curl/") {
            "curl"
        } else {
            value
        };
        out.push_str(&format!("- {name}: {value}\n"));
    }

    if !request.body.is_empty() {
        out.push_str("Body:\n");
        out.push_str(&String::from_utf8_lossy(&request.body));
        out.push('\n');
    }
    out
}
