// Integration tests for config types and configuration setters.

use std::time::Duration;

use workpool::config::{
    DEFAULT_QUEUE_CAPACITY, DEFAULT_THREAD_CEILING, IDLE_POLL_INTERVAL, IDLE_TIMEOUT,
    SUBMIT_TIMEOUT,
};
use workpool::{PoolConfig, PoolError, PoolMode, ThreadPool};

#[test]
fn test_config_defaults() {
    let config = PoolConfig::default();

    assert_eq!(config.mode, PoolMode::Fixed);
    assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    assert_eq!(config.queue_capacity, i32::MAX as usize);
    assert_eq!(config.max_threads, DEFAULT_THREAD_CEILING);
    assert_eq!(config.max_threads, 100);
    assert_eq!(config.initial_threads, num_cpus::get());
}

#[test]
fn test_fixed_policy_constants() {
    assert_eq!(SUBMIT_TIMEOUT, Duration::from_secs(1));
    assert_eq!(IDLE_TIMEOUT, Duration::from_secs(60));
    assert_eq!(IDLE_POLL_INTERVAL, Duration::from_secs(1));
}

#[test]
fn test_setters_before_start() {
    let pool = ThreadPool::new();

    pool.set_mode(PoolMode::Elastic).unwrap();
    pool.set_max_threads(8).unwrap();
    pool.set_queue_capacity(64).unwrap();
    pool.set_initial_threads(2).unwrap();
}

#[test]
fn test_thread_ceiling_requires_elastic_mode() {
    let pool = ThreadPool::new(); // defaults to Fixed

    let err = pool.set_max_threads(8).unwrap_err();
    assert!(matches!(err, PoolError::ConfigurationRejected(_)));
}

#[test]
fn test_setters_rejected_after_start() {
    let pool = ThreadPool::with_config(PoolConfig {
        initial_threads: 1,
        ..Default::default()
    });
    pool.start().unwrap();

    assert!(matches!(
        pool.set_mode(PoolMode::Elastic),
        Err(PoolError::ConfigurationRejected(_))
    ));
    assert!(matches!(
        pool.set_queue_capacity(16),
        Err(PoolError::ConfigurationRejected(_))
    ));
    assert!(matches!(
        pool.set_initial_threads(4),
        Err(PoolError::ConfigurationRejected(_))
    ));

    pool.shutdown().unwrap();

    // A shut-down pool cannot be reconfigured and restarted either.
    assert!(matches!(
        pool.set_mode(PoolMode::Elastic),
        Err(PoolError::ConfigurationRejected(_))
    ));
}

#[test]
fn test_config_debug_format() {
    let config = PoolConfig::default();
    assert!(format!("{:?}", config).contains("queue_capacity"));
    assert!(format!("{:?}", config).contains("Fixed"));
}
