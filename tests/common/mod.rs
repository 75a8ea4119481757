use rand::Rng;

mod params_builder;
mod test_client;
mod test_server;

pub use params_builder::MemclitedServerParamsBuilder;
pub use test_client::TextClient;
pub use test_server::spawn_server;

#[allow(dead_code)]
pub fn create_value_with_size(size: usize) -> String {
    let mut rng = rand::rng();
    let mut value = String::with_capacity(size);
    for _ in 0..size {
        let random_char = rng.random_range(b'a'..=b'z') as char;
        value.push(random_char);
    }
    value
}
