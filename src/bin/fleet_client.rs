//! Drives a handful of simulated vehicles against a running route-mesh
//! server. Configure with `FLEET_URL`, `FLEET_SIZE` and `FLEET_TICKS`.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use route_mesh::domains::agent::{AgentState, ServerMessage};
use route_mesh::domains::simulation::{generate_agents, GridMap};

const STEP_FRACTION: f64 = 0.1;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let url = std::env::var("FLEET_URL").unwrap_or_else(|_| "ws://127.0.0.1:8000/ws/agent".to_string());
    let size: usize = env_or("FLEET_SIZE", 5);
    let ticks: usize = env_or("FLEET_TICKS", 10);

    info!("Launching {} simulated vehicles against {}", size, url);

    let mut tasks = Vec::new();
    for agent in generate_agents(&GridMap::default(), size) {
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let agent_id = agent.id.clone();
            if let Err(e) = drive(url, agent, ticks).await {
                warn!(%agent_id, "vehicle stopped: {:#}", e);
            }
        }));
    }

    for task in tasks {
        let _ = task.await;
    }
    info!("Fleet finished");
    Ok(())
}

async fn drive(url: String, mut agent: AgentState, ticks: usize) -> Result<()> {
    let (socket, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", url))?;
    let (mut sink, mut stream) = socket.split();

    sink.send(Message::Text(serde_json::to_string(&agent)?)).await?;

    let agent_id = agent.id.clone();
    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            };
            match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Neighbours { neighbours }) => {
                    info!(%agent_id, count = neighbours.len(), "neighbours: {:?}", neighbours);
                }
                Ok(ServerMessage::Route { route }) => {
                    info!(%agent_id, waypoints = route.waypoints.len(), "received revised route");
                }
                Err(e) => warn!(%agent_id, "unrecognised push: {}", e),
            }
        }
    });

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    for _ in 0..ticks {
        interval.tick().await;
        agent.location.lat += (agent.destination.lat - agent.location.lat) * STEP_FRACTION;
        agent.location.lon += (agent.destination.lon - agent.location.lon) * STEP_FRACTION;
        sink.send(Message::Text(serde_json::to_string(&agent)?)).await?;
    }

    sink.send(Message::Close(None)).await?;
    let _ = reader.await;
    Ok(())
}
