use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chess_peer::{BoardRenderer, Phase, Session, SessionEvent, StartMode};
use protocol::{Listener, NetworkConfig, ProtocolError, TcpListener, DEFAULT_PORT};

/// 点对点双人国际象棋：不带 --ip 作为监听方执白，带 --ip 连接主机执黑
#[derive(Parser, Debug)]
#[command(name = "chess-peer")]
struct Args {
    /// 主机地址（缺省则进入监听模式）
    #[arg(long)]
    ip: Option<String>,

    /// 端口
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// 棋盘显示尺寸
    #[arg(long, default_value_t = 600)]
    size: u32,

    /// Chess960 模式（随机初始底线）
    #[arg(long)]
    c960: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chess_peer=debug".parse()?)
                .add_directive("protocol=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let renderer = BoardRenderer::new(args.size);

    let mut session = match &args.ip {
        None => {
            let config = NetworkConfig {
                host: "0.0.0.0".to_string(),
                port: args.port,
            };
            info!("监听 {}，等待对方加入...", config.addr());
            let mut listener = TcpListener::bind(&config.addr()).await?;
            let mode = if args.c960 {
                StartMode::Chess960
            } else {
                StartMode::Standard
            };
            Session::host(&mut listener, mode).await?
        }
        Some(ip) => {
            let addr = format!("{}:{}", ip, args.port);
            info!("连接主机 {} ...", addr);
            Session::connect(&addr, args.c960).await?
        }
    };

    if let Some(addr) = session.peer_addr() {
        info!("对局开始，对方 {}", addr);
    }
    println!("{}", renderer.render(&session.snapshot().await));

    // 主单元：stdin 读本地走子，同时消费后台同步循环的事件
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let token = line.trim();
                if token.is_empty() {
                    continue;
                }
                match session.play_local(token).await {
                    Ok(snapshot) => {
                        println!("{}", renderer.render(&snapshot));
                        if snapshot.phase == Phase::GameOver {
                            break;
                        }
                    }
                    Err(ProtocolError::Move(e)) => {
                        error!("走子被拒绝: {}", e);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            event = session.next_event() => {
                match event {
                    Some(SessionEvent::BoardUpdated(snapshot)) => {
                        println!("{}", renderer.render(&snapshot));
                        if snapshot.phase == Phase::GameOver {
                            break;
                        }
                    }
                    Some(SessionEvent::RemoteRejected { token, error }) => {
                        error!("忽略对方非法消息 {}: {}", token, error);
                    }
                    Some(SessionEvent::SessionBroken { reason }) => {
                        error!("会话中断: {}", reason);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    Ok(())
}
