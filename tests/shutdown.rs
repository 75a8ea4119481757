mod common;

use common::{MemclitedServerParamsBuilder, TextClient};

#[test]
fn shutdown_closes_open_connections_and_joins_workers() {
    let mut server = common::spawn_server(MemclitedServerParamsBuilder::new());
    let mut client = TextClient::connect(&server.address());
    assert_eq!(client.set("k1", 0, "wombat"), "STORED\r\n");

    // kill() cancels the token and joins the server thread, which only
    // returns after the workers have drained
    server.kill();

    // the open connection is dropped by its handler
    assert_eq!(client.read_line(), "");
}
