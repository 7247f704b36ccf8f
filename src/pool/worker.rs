//! # Pool de Workers
//! src/pool/worker.rs
//!
//! Número fijo de threads de larga vida. Cada worker repite:
//! desencolar una tarea, ejecutar el handler, volver a esperar.
//!
//! El pool es genérico sobre la tarea: transporta un `T` opaco y un
//! handler `Fn(T)`, así la lógica de conexiones se puede probar por
//! separado del pool y viceversa.

use super::queue::TaskQueue;
use crate::error::ServeError;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Pool de workers alimentado por una cola acotada
pub struct WorkerPool<T: Send + 'static> {
    queue: Arc<TaskQueue<T>>,

    /// Handles de los threads; se vacía en `shutdown()`
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Workers que todavía no salieron de su loop
    alive: Arc<AtomicUsize>,

    worker_count: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Crea el pool e inicia `worker_count` workers de inmediato
    ///
    /// # Errores
    ///
    /// Si algún thread no se puede crear, se detienen los que ya arrancaron
    /// y se retorna el error de IO.
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::pool::WorkerPool;
    ///
    /// let pool = WorkerPool::create(2, 8, |n: u32| {
    ///     assert!(n < 10);
    ///     Ok(())
    /// }).unwrap();
    ///
    /// pool.submit(1).unwrap();
    /// pool.shutdown();
    /// assert!(pool.submit(2).is_err());
    /// ```
    pub fn create<F>(worker_count: usize, queue_capacity: usize, handler: F) -> Result<Self, ServeError>
    where
        F: Fn(T) -> Result<(), ServeError> + Send + Sync + 'static,
    {
        if worker_count == 0 {
            return Err(invalid_input("worker count must be >= 1"));
        }
        if queue_capacity == 0 {
            return Err(invalid_input("queue capacity must be >= 1"));
        }

        let queue = Arc::new(TaskQueue::new(queue_capacity));
        let handler = Arc::new(handler);
        let alive = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::with_capacity(worker_count);

        for id in 0..worker_count {
            let worker_queue = Arc::clone(&queue);
            let worker_handler = Arc::clone(&handler);
            let worker_alive = Arc::clone(&alive);

            alive.fetch_add(1, Ordering::SeqCst);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    let _alive = AliveGuard(&worker_alive);
                    worker_loop(id, &worker_queue, &*worker_handler)
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    alive.fetch_sub(1, Ordering::SeqCst);
                    error!(worker = id, error = %e, "💥 No se pudo crear el worker");
                    queue.close();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(ServeError::Io(e));
                }
            }
        }

        debug!(workers = worker_count, capacity = queue_capacity, "👷 Pool de workers iniciado");

        Ok(Self {
            queue,
            workers: Mutex::new(workers),
            alive,
            worker_count,
        })
    }

    /// Entrega una tarea al pool
    ///
    /// Bloquea mientras la cola está llena. Falla con `PoolClosed` después
    /// de `shutdown()`.
    pub fn submit(&self, task: T) -> Result<(), ServeError> {
        self.queue.enqueue(task)
    }

    /// Cierra la cola y espera a que todos los workers terminen
    ///
    /// Los workers ocupados terminan su tarea actual (y drenan lo que haya
    /// quedado encolado); los que esperaban trabajo salen de inmediato.
    /// Llamarlo más de una vez no tiene efecto. No debe llamarse desde un
    /// worker del mismo pool.
    ///
    /// Si dos threads lo llaman a la vez, ambos retornan recién cuando
    /// todos los workers terminaron: los joins se hacen con el lock de
    /// `workers` tomado.
    pub fn shutdown(&self) {
        let first = self.queue.close();

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                error!("💥 Un worker hizo panic fuera de una tarea");
            }
        }
        drop(workers);

        if first {
            info!(
                workers = self.worker_count,
                queue_high_water = self.queue.high_water(),
                "🛑 Pool de workers detenido"
            );
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Workers que todavía no terminaron su loop
    pub fn live_workers(&self) -> usize {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Ocupación máxima que llegó a tener la cola
    pub fn queue_high_water(&self) -> usize {
        self.queue.high_water()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Descuenta al worker de `alive` al salir, incluso por panic
struct AliveGuard<'a>(&'a AtomicUsize);

impl Drop for AliveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Loop principal del worker
///
/// Un error o un panic dentro del handler afecta solo a esa tarea: se
/// registra y el worker vuelve a esperar trabajo.
fn worker_loop<T, F>(id: usize, queue: &TaskQueue<T>, handler: &F)
where
    F: Fn(T) -> Result<(), ServeError>,
{
    debug!(worker = id, "🔧 Worker iniciado");

    while let Some(task) = queue.dequeue() {
        match panic::catch_unwind(AssertUnwindSafe(|| handler(task))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(worker = id, error = %e, "❌ La tarea falló"),
            Err(_) => error!(worker = id, "💥 La tarea hizo panic"),
        }
    }

    debug!(worker = id, "🔧 Worker terminando");
}

fn invalid_input(message: &str) -> ServeError {
    ServeError::Io(io::Error::new(io::ErrorKind::InvalidInput, message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_single_worker_is_fifo() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let pool = WorkerPool::create(1, 4, {
            let seen = Arc::clone(&seen);
            move |n: usize| {
                seen.lock().unwrap().push(n);
                Ok(())
            }
        })
        .unwrap();

        for i in 0..50 {
            pool.submit(i).unwrap();
        }
        pool.shutdown();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_concurrency_never_exceeds_worker_count() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let pool = WorkerPool::create(4, 8, {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let done = Arc::clone(&done);
            move |_: u32| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                active.fetch_sub(1, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

        for i in 0..60 {
            pool.submit(i).unwrap();
        }
        pool.shutdown();

        assert_eq!(done.load(Ordering::SeqCst), 60);
        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert!(pool.queue_high_water() <= 8);
    }

    #[test]
    fn test_shutdown_stops_all_workers() {
        let marker = Arc::new(());
        let pool = WorkerPool::create(3, 2, {
            let marker = Arc::clone(&marker);
            move |_: u8| {
                let _keep = &marker;
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(pool.worker_count(), 3);
        assert_eq!(pool.live_workers(), 3);
        pool.shutdown();

        assert_eq!(pool.live_workers(), 0);
        // Cada worker tenía una copia del handler: si todos salieron, solo
        // queda la referencia del test
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn test_concurrent_shutdown_waits_for_workers() {
        let finished = Arc::new(AtomicBool::new(false));
        let pool = Arc::new(
            WorkerPool::create(1, 2, {
                let finished = Arc::clone(&finished);
                move |_: u8| {
                    thread::sleep(Duration::from_millis(500));
                    finished.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap(),
        );

        pool.submit(1).unwrap();
        // Que el worker ya tenga la tarea en curso
        while pool.queue_len() > 0 {
            thread::sleep(Duration::from_millis(1));
        }

        let first = thread::spawn({
            let pool = Arc::clone(&pool);
            move || pool.shutdown()
        });
        thread::sleep(Duration::from_millis(50));

        // El segundo llamado no puede volver antes que el worker
        pool.shutdown();
        assert!(finished.load(Ordering::SeqCst), "shutdown() returned while a worker was still running");
        assert_eq!(pool.live_workers(), 0);

        first.join().unwrap();
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::create(2, 2, |_: u8| Ok(())).unwrap();
        pool.shutdown();
        pool.shutdown();

        assert!(pool.is_closed());
        for i in 0..3 {
            assert!(matches!(pool.submit(i), Err(ServeError::PoolClosed)));
        }
    }

    #[test]
    fn test_failures_do_not_kill_the_worker() {
        let handled = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::create(1, 4, {
            let handled = Arc::clone(&handled);
            move |n: u32| {
                handled.fetch_add(1, Ordering::SeqCst);
                match n {
                    1 => Err(ServeError::MalformedRequest),
                    2 => panic!("handler blew up"),
                    _ => Ok(()),
                }
            }
        })
        .unwrap();

        for i in 0..5 {
            pool.submit(i).unwrap();
        }
        pool.shutdown();

        assert_eq!(handled.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_full_queue_blocks_submitter() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);

        let pool = Arc::new(
            WorkerPool::create(1, 1, move |_: u32| {
                let _ = release_rx.lock().unwrap().recv();
                Ok(())
            })
            .unwrap(),
        );

        // 1 lo toma el worker (y queda bloqueado), 2 llena la cola
        pool.submit(1).unwrap();
        pool.submit(2).unwrap();

        let submitted = Arc::new(AtomicBool::new(false));
        let submitter = thread::spawn({
            let pool = Arc::clone(&pool);
            let submitted = Arc::clone(&submitted);
            move || {
                pool.submit(3).unwrap();
                submitted.store(true, Ordering::SeqCst);
            }
        });

        thread::sleep(Duration::from_millis(100));
        assert!(!submitted.load(Ordering::SeqCst), "submit should block while the queue is full");
        assert_eq!(pool.queue_len(), 1);

        for _ in 0..3 {
            release_tx.send(()).unwrap();
        }
        submitter.join().unwrap();
        assert!(submitted.load(Ordering::SeqCst));

        pool.shutdown();
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(WorkerPool::create(0, 4, |_: u8| Ok(())).is_err());
        assert!(WorkerPool::create(4, 0, |_: u8| Ok(())).is_err());
    }
}
