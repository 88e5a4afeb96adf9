use std::time::Duration;

use crate::domain::AdapterSettings;
use crate::error::{AppError, AppResult, ConnectError, CycleError};
use crate::protocol::ProtocolAdapter;

use super::super::WebSocketAdapter;
use super::{WsBehavior, join_server, refused_addr, run_async_test, spawn_websocket_mock_server};

fn adapter() -> WebSocketAdapter {
    WebSocketAdapter::new(&AdapterSettings {
        connect_timeout: Duration::from_secs(1),
        request_timeout: Some(Duration::from_secs(1)),
        ..AdapterSettings::default()
    })
}

#[test]
fn websocket_cycles_round_trip_over_one_socket() -> AppResult<()> {
    run_async_test(async {
        let (addr, server) = spawn_websocket_mock_server(WsBehavior::Echo).await?;
        let mut connection = adapter()
            .connect(&addr.to_string())
            .await
            .map_err(|err| AppError::validation(format!("connect failed: {}", err)))?;

        for _ in 0..4 {
            let outcome = connection.execute_once().await;
            if let Some(err) = outcome.error {
                return Err(AppError::validation(format!("cycle failed: {}", err)));
            }
        }
        connection.close().await;
        connection.close().await;
        drop(connection);

        assert_eq!(join_server(server).await?, 4);
        Ok(())
    })
}

#[test]
fn websocket_peer_close_ends_cycle_with_transport_failure() -> AppResult<()> {
    run_async_test(async {
        let (addr, server) = spawn_websocket_mock_server(WsBehavior::CloseOnFirstMessage).await?;
        let mut connection = adapter()
            .connect(&addr.to_string())
            .await
            .map_err(|err| AppError::validation(format!("connect failed: {}", err)))?;

        let outcome = connection.execute_once().await;
        let err = outcome
            .error
            .ok_or_else(|| AppError::validation("Expected a failed cycle"))?;
        assert!(matches!(err, CycleError::ConnectionClosed));
        assert!(!err.connection_usable());

        connection.close().await;
        drop(connection);
        assert_eq!(join_server(server).await?, 0);
        Ok(())
    })
}

#[test]
fn websocket_connect_to_closed_port_fails() -> AppResult<()> {
    run_async_test(async {
        let addr = refused_addr().await?;
        let result = adapter().connect(&addr.to_string()).await;
        assert!(matches!(result, Err(ConnectError::WebSocket { .. })));
        Ok(())
    })
}

#[test]
fn websocket_url_appends_path() -> Result<(), ConnectError> {
    let url = adapter().url_for("127.0.0.1:8080")?;
    assert_eq!(url.as_str(), "ws://127.0.0.1:8080/ws");

    let custom = WebSocketAdapter::new(&AdapterSettings {
        websocket_path: "chat".to_owned(),
        ..AdapterSettings::default()
    });
    assert_eq!(
        custom.url_for("ws://example.test:9000/")?.as_str(),
        "ws://example.test:9000/chat"
    );
    Ok(())
}

#[test]
fn websocket_url_rejects_garbage_target() {
    assert!(matches!(
        adapter().url_for("bad host:80"),
        Err(ConnectError::InvalidWebSocketUrl { .. })
    ));
}

#[test]
fn adapter_reports_ws_metric_names() {
    let names = adapter().metric_names();
    assert_eq!(names.success, "ws.success");
    assert_eq!(names.latency, "ws.latency");
}
