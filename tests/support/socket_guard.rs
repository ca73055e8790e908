//! Mock Immich server startup for hosts that may forbid loopback sockets.
//!
//! Sandboxed CI runners sometimes cannot bind `127.0.0.1`. Tests then skip
//! with a note on stderr, unless `IMMICH_FAVORITES_REQUIRE_SOCKET_TESTS` is
//! set to a truthy value, in which case they fail.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_SOCKETS_VAR: &str = "IMMICH_FAVORITES_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_VAR).is_ok_and(|value| {
        ["1", "true", "yes"]
            .iter()
            .any(|truthy| value.eq_ignore_ascii_case(truthy))
    })
}

/// Starts a mock server, or returns `None` when loopback is unavailable.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl std::future::Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let loopback = TcpListener::bind("127.0.0.1:0").map(drop);

    async move {
        match loopback {
            Ok(()) => Some(MockServer::start().await),
            Err(error) => {
                let note = format!(
                    "mock Immich server unavailable at {}:{} ({error})",
                    caller.file(),
                    caller.line()
                );
                assert!(!sockets_required(), "{note}; {REQUIRE_SOCKETS_VAR} is set");
                eprintln!("skipping: {note}");
                None
            }
        }
    }
}

/// Value a skipped test returns in place of its normal result.
pub trait Skipped {
    fn skipped() -> Self;
}

impl Skipped for () {
    fn skipped() -> Self {}
}

impl<E> Skipped for Result<(), E> {
    fn skipped() -> Self {
        Ok(())
    }
}

pub fn socket_skip_return<T: Skipped>() -> T {
    T::skipped()
}
