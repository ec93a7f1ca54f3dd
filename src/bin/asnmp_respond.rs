//! asnmp-respond: answer every SNMP request with an echoing Response.
//!
//! Prints each received message, invalid datagram and processing error to
//! stdout until interrupted.

use async_snmp_receiver::Receiver;
use async_snmp_receiver::cli::args::RespondArgs;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = RespondArgs::parse();

    // Initialize tracing
    args.output.init_tracing();

    let receiver = Receiver::builder(tracing::info_span!("asnmp-respond", name = %args.name))
        .name(args.name.clone())
        .build();

    receiver.events().on_message(|msg| {
        let source = msg.src.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "{} {} {} request-id={} community={}",
            source,
            msg.version,
            msg.pdu.pdu_type,
            msg.pdu.request_id,
            String::from_utf8_lossy(&msg.community)
        );
        for vb in &msg.pdu.varbinds {
            println!("  {}", vb);
        }
        Ok(())
    });
    receiver.events().on_invalid_message(|ev| {
        println!("{} invalid message ({} bytes): {}", ev.source, ev.raw.len(), ev.error);
    });
    receiver.events().on_message_error(|ev| {
        let source = ev.source.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "{} error handling request-id={}: {}",
            source, ev.message.pdu.request_id, ev.error
        );
    });

    let socket = match receiver.create_socket_at(args.bind).await {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    eprintln!("{} listening on {}", receiver.name(), socket.local_addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error: {}", e);
    }

    socket.close().await;
    receiver.shutdown();
    eprintln!(
        "{} stopped, {} malformed message(s)",
        receiver.name(),
        receiver.malformed_messages()
    );
    ExitCode::SUCCESS
}
