// src/types.rs
use serde::{Deserialize, Serialize};

// 连接模式
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum ConnectionMode {
    Simulation,
    Hardware,
}

// 传输线程发给 GUI 的消息
#[derive(Clone, Debug)]
pub enum TransportEvent {
    Log(String),
    Status(bool), // 连接状态
}
