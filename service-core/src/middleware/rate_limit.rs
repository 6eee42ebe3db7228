use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// `attempts` requests per `window_seconds`, replenished evenly, with a burst
/// of `attempts`.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period_ms = ((window_seconds.max(1) * 1000) / attempts.get() as u64).max(1);
    let quota = Quota::with_period(Duration::from_millis(period_ms))
        .unwrap_or_else(|| Quota::per_second(attempts))
        .allow_burst(attempts);
    Arc::new(RateLimiter::dashmap(quota))
}

/// Drops keys whose quota has fully replenished; they behave like new keys.
pub fn prune_rate_limiter(limiter: &IpRateLimiter) {
    limiter.retain_recent();
    limiter.shrink_to_fit();
}

/// Prunes `limiters` every `period` for as long as the runtime lives.
///
/// Keys come from client-controlled headers, so without this the stores only
/// ever grow.
pub fn spawn_rate_limiter_cleanup(
    limiters: Vec<IpRateLimiter>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            for limiter in &limiters {
                prune_rate_limiter(limiter);
                tracing::debug!(keys = limiter.len(), "Pruned rate limiter");
            }
        }
    })
}

/// First hop of `x-forwarded-for`, else the socket peer.
fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded_ip.or_else(|| {
        request
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|axum::extract::ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_ip(&request) {
        Some(ip) => match limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(ip = %ip, "Rate limit exceeded");
                Err(AppError::TooManyRequests(
                    "Too many requests from this IP. Please try again later.".to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router, body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn blocks_after_burst_is_spent() {
        let limiter = create_ip_rate_limiter(2, 3600);
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(limiter, ip_rate_limit_middleware));

        let request = || {
            Request::builder()
                .uri("/")
                .header("x-forwarded-for", "10.0.0.7")
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(app.clone().oneshot(request()).await.unwrap().status(), StatusCode::OK);
        assert_eq!(app.clone().oneshot(request()).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            app.oneshot(request()).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn replenished_keys_are_pruned() {
        // 10 per second: one request is paid back after 100ms.
        let limiter = create_ip_rate_limiter(10, 1);
        let busy = IpAddr::from([10, 0, 0, 1]);
        assert!(limiter.check_key(&busy).is_ok());

        prune_rate_limiter(&limiter);
        assert_eq!(limiter.len(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        prune_rate_limiter(&limiter);
        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn cleanup_task_prunes_in_background() {
        let limiter = create_ip_rate_limiter(10, 1);
        for last in 0..50u8 {
            assert!(limiter.check_key(&IpAddr::from([10, 0, 1, last])).is_ok());
        }
        assert_eq!(limiter.len(), 50);

        let task = spawn_rate_limiter_cleanup(vec![limiter.clone()], Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(400)).await;
        task.abort();

        assert!(limiter.is_empty());
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let limiter = create_ip_rate_limiter(0, 60);
        assert!(limiter.check_key(&IpAddr::from([127, 0, 0, 1])).is_ok());
    }
}
