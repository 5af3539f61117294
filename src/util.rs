use std::net::SocketAddr;

const API_TOKEN: &str = "MONITOR_API_TOKEN";

pub fn get_api_token() -> Option<String> {
    std::env::var(API_TOKEN).ok().filter(|token| !token.is_empty())
}

const API_ADDR: &str = "MONITOR_API_ADDR";

pub fn get_api_addr() -> Option<SocketAddr> {
    let addr_from_env = std::env::var(API_ADDR);
    addr_from_env.ok().and_then(|res| res.parse().ok())
}

const TELEGRAM_TOKEN: &str = "MONITOR_TELEGRAM_TOKEN";

pub fn get_telegram_token() -> Option<String> {
    std::env::var(TELEGRAM_TOKEN)
        .ok()
        .filter(|token| !token.is_empty())
}
