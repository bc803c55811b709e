//! 会话建立与后台同步循环
//!
//! 每个进程只有两个执行单元：主单元（输入/渲染）和一个后台接收任务。
//! 共享的 Game 放在互斥锁后面 —— 回合交替本身已经保证同一时刻只有
//! 一方会写棋盘，但这只是活性假设，不是语言层面的保证，所以这里
//! 仍然加显式互斥。接收循环里的任何传输错误都转化为 SessionBroken
//! 终态事件上报（源程序在这里会让读线程悄悄崩掉，属刻意改进）。

use std::sync::Arc;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};

use protocol::{
    Connection, Connector, Listener, MoveError, PeerRole, Result, TcpConnector, TcpListener,
    TokenReader, TokenWriter,
};

use crate::game::{Game, MoveOrigin, Phase, Snapshot, StartMode};
use crate::start;

/// 后台同步循环上报给 UI 层的事件
#[derive(Debug)]
pub enum SessionEvent {
    /// 对方走子已生效，附新快照
    BoardUpdated(Snapshot),
    /// 对方消息被拒绝（记录并丢弃，循环继续）
    RemoteRejected { token: String, error: MoveError },
    /// 传输层故障，会话进入终态
    SessionBroken { reason: String },
}

/// 一次对弈会话：一条 TCP 连接 + 本端颜色 + 后台接收任务
///
/// 进程生命周期内只建立一次，不重连。
pub struct Session {
    game: Arc<Mutex<Game>>,
    writer: TokenWriter<OwnedWriteHalf>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    reader_task: JoinHandle<()>,
    peer_addr: Option<String>,
}

impl Session {
    /// 监听方路径：accept 一个对端，发送初始 FEN，启动同步循环
    ///
    /// accept 可以无限期阻塞，启动失败直接致命，均与源程序一致。
    pub async fn host(listener: &mut TcpListener, mode: StartMode) -> Result<Self> {
        let conn = listener.accept().await?;
        let peer_addr = conn.peer_addr();
        info!("对方已加入: {:?}", peer_addr);

        let game = match mode {
            StartMode::Standard => Game::standard(PeerRole::Host),
            StartMode::Chess960 => {
                let (n, position) = start::random_chess960()?;
                info!("Chess960 初始局面编号 {}", n);
                Game::new(position, PeerRole::Host)
            }
        };

        let (reader, mut writer) = conn.split();
        let fen = game.fen();
        writer.send_text(&fen).await?;
        info!("已发送初始 FEN: {}", fen);

        Ok(Self::spawn(game, reader, writer, peer_addr))
    }

    /// 连接方路径：connect，阻塞接收一次初始 FEN，启动同步循环
    pub async fn connect(addr: &str, chess960: bool) -> Result<Self> {
        let conn = TcpConnector.connect(addr).await?;
        let peer_addr = conn.peer_addr();
        info!("已连接主机: {}", addr);

        let (mut reader, writer) = conn.split();
        let fen = reader.recv_text().await?;
        info!("收到初始 FEN: {}", fen);

        let game = Game::from_fen(&fen, chess960, PeerRole::Client)?;
        Ok(Self::spawn(game, reader, writer, peer_addr))
    }

    fn spawn(
        game: Game,
        reader: TokenReader<OwnedReadHalf>,
        writer: TokenWriter<OwnedWriteHalf>,
        peer_addr: Option<String>,
    ) -> Self {
        let game = Arc::new(Mutex::new(game));
        let (tx, events) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(sync_loop(Arc::clone(&game), reader, tx));

        Self {
            game,
            writer,
            events,
            reader_task,
            peer_addr,
        }
    }

    /// 本地走子：先过状态机，成功后把原始记号发给对方
    ///
    /// 发送是走子完成后的收尾动作，主单元不会在网络上长时间阻塞。
    pub async fn play_local(&mut self, token: &str) -> Result<Snapshot> {
        let snapshot = {
            let mut game = self.game.lock().await;
            game.apply_move(token, MoveOrigin::Local)?
        };
        self.writer.send_text(token).await?;
        info!("已发送走子: {}", token);
        Ok(snapshot)
    }

    /// 等待下一条会话事件
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// 当前快照
    pub async fn snapshot(&self) -> Snapshot {
        self.game.lock().await.snapshot()
    }

    /// 当前局面 FEN
    pub async fn fen(&self) -> String {
        self.game.lock().await.fen()
    }

    pub fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// 后台同步循环
///
/// 阻塞读 → 当作一个走子记号 → apply_move(Remote) → 上报事件。
/// 终局或传输故障后退出（源程序的循环永不退出，这里收敛为显式终态）。
async fn sync_loop(
    game: Arc<Mutex<Game>>,
    mut reader: TokenReader<OwnedReadHalf>,
    tx: mpsc::UnboundedSender<SessionEvent>,
) {
    loop {
        let token = match reader.recv_text().await {
            Ok(text) => text,
            Err(e) => {
                error!("接收失败，会话中断: {}", e);
                let _ = tx.send(SessionEvent::SessionBroken {
                    reason: e.to_string(),
                });
                return;
            }
        };
        info!("收到对方走子: {}", token);

        let result = {
            let mut game = game.lock().await;
            game.apply_move(token.trim(), MoveOrigin::Remote)
        };

        match result {
            Ok(snapshot) => {
                let over = snapshot.phase == Phase::GameOver;
                if tx.send(SessionEvent::BoardUpdated(snapshot)).is_err() {
                    return;
                }
                if over {
                    return;
                }
            }
            Err(e) => {
                error!("对方走子 {} 被拒绝: {}", token, e);
                let _ = tx.send(SessionEvent::RemoteRejected { token, error: e });
            }
        }
    }
}
