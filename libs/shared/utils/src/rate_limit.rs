use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use shared_config::AppConfig;
use shared_models::error::AppError;

/// Upper bound on tracked clients; expired windows are swept before refusing new ones.
const DEFAULT_MAX_CLIENTS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Clients {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Fixed-window request limiter keyed by client address.
///
/// Clients are keyed on the socket address. `X-Forwarded-For` is only
/// consulted when the limiter is told it sits behind a trusted proxy.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    trust_proxy: bool,
    max_clients: usize,
    clients: Mutex<Clients>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            trust_proxy: false,
            max_clients: DEFAULT_MAX_CLIENTS,
            clients: Mutex::new(Clients {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.rate_limit_per_window, Duration::from_secs(config.rate_limit_window_secs))
            .with_trusted_proxy(config.trust_proxy)
    }

    pub fn with_trusted_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Counts one request for `client` at `now`; returns false once the window is exhausted.
    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if !clients.windows.contains_key(client) && clients.windows.len() >= self.max_clients {
            // Sweeping is O(n), so it runs at most once per window
            if now.duration_since(clients.last_sweep) >= self.window {
                let window = self.window;
                clients.windows.retain(|_, w| now.duration_since(w.started) < window);
                clients.last_sweep = now;
            }
            if clients.windows.len() >= self.max_clients {
                warn!("Rate limiter tracking {} clients, refusing new client {}", self.max_clients, client);
                return false;
            }
        }

        let entry = clients
            .windows
            .entry(client.to_string())
            .or_insert(Window { started: now, count: 0 });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.limit {
            return false;
        }
        entry.count += 1;
        true
    }

    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn client_key(&self, request: &Request<Body>) -> String {
        if self.trust_proxy {
            if let Some(forwarded) = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
            {
                let forwarded = forwarded.trim();
                if !forwarded.is_empty() {
                    return forwarded.to_string();
                }
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let client = limiter.client_key(&request);

    if !limiter.check(&client) {
        warn!("Rate limit exceeded for client {}", client);
        return Err(AppError::RateLimited("Too many requests, please try again later".to_string()));
    }

    Ok(next.run(request).await)
}
