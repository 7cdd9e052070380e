use std::net::{Ipv4Addr, SocketAddr};

use tokio::{
    net::{TcpListener, TcpSocket, TcpStream},
    sync::watch,
};

/// A cloneable trigger used to stop the server
///
/// holds the server's active flag, any clone can clear it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    active: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        let (active, _) = watch::channel(true);
        Self { active }
    }
}

impl Shutdown {
    pub fn trigger(&self) {
        self.active.send_replace(false);
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.active.subscribe()
    }
}

/// A tcp listener that can be closed from the outside
///
/// once the shutdown is triggered the socket is dropped, and any pending
/// or future accept returns None instead of failing.
pub struct Listener {
    listener: Option<TcpListener>,
    active: watch::Receiver<bool>,
    local_addr: SocketAddr,
}

impl Listener {
    /// binds to all interfaces on the given port
    pub fn bind(port: u16, backlog: u32, shutdown: &Shutdown) -> tokio::io::Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        let socket = TcpSocket::new_v4()?;
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(backlog)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener: Some(listener),
            active: shutdown.subscribe(),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.listener.is_none()
    }

    /// waits for a new connection
    ///
    /// returns None once the listener has been closed by a shutdown.
    pub async fn accept(&mut self) -> tokio::io::Result<Option<(TcpStream, SocketAddr)>> {
        if !*self.active.borrow_and_update() {
            self.close();
        }
        let Some(listener) = &self.listener else {
            return Ok(None);
        };

        let accepted = tokio::select! {
            accepted = listener.accept() => Some(accepted),
            _ = stopped(&mut self.active) => None,
        };

        match accepted {
            Some(accepted) => accepted.map(Some),
            None => {
                self.close();
                Ok(None)
            }
        }
    }

    fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            tracing::debug!("closing the listener on {}", self.local_addr);
            drop(listener);
        }
    }
}

// resolves once the active flag is cleared
async fn stopped(active: &mut watch::Receiver<bool>) {
    loop {
        let is_active = *active.borrow_and_update();
        if !is_active {
            return;
        }

        if active.changed().await.is_err() {
            // every trigger is gone, the flag can't be cleared anymore
            std::future::pending::<()>().await;
        }
    }
}

/// waits for a termination signal, then triggers the shutdown
pub async fn wait_for_termination(shutdown: Shutdown) -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = terminate.recv() => {}
            result = ctrl_c => result?,
        };
    }

    #[cfg(not(unix))]
    ctrl_c.await?;

    tracing::info!(action = "sigterm_received", result = "success");
    shutdown.trigger();

    Ok(())
}
