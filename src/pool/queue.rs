//! # Cola Acotada de Tareas
//! src/pool/queue.rs
//!
//! Buffer circular de capacidad fija, protegido por un único mutex y dos
//! condvars (`not_empty`, `not_full`). Es el único estado compartido que
//! se muta desde varios threads.
//!
//! - `enqueue` bloquea mientras la cola está llena (backpressure).
//! - `dequeue` bloquea mientras está vacía.
//! - `close` marca `stopping` y despierta a todos; a partir de ahí
//!   `enqueue` falla con `PoolClosed` y `dequeue` drena lo que quede y
//!   luego retorna `None`.

use crate::error::ServeError;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Estado interno, solo accesible con el lock tomado
struct QueueState<T> {
    /// Slots del buffer circular
    slots: Box<[Option<T>]>,

    /// Próximo slot a desencolar
    head: usize,

    /// Próximo slot libre para encolar
    tail: usize,

    /// Ocupación actual, siempre `<= capacity`
    count: usize,

    stopping: bool,

    /// Ocupación máxima observada
    high_water: usize,
}

/// Cola FIFO acotada y bloqueante
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> TaskQueue<T> {
    /// Crea una cola con `capacity` slots
    ///
    /// # Panics
    ///
    /// Si `capacity` es 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be >= 1");

        let slots = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();

        Self {
            state: Mutex::new(QueueState {
                slots,
                head: 0,
                tail: 0,
                count: 0,
                stopping: false,
                high_water: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Los handlers corren fuera del lock, así que un panic nunca deja el
    /// estado a medio actualizar: se recupera el guard envenenado.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un elemento al final
    ///
    /// Bloquea mientras la cola está llena. Si la cola se cerró (antes o
    /// durante la espera) retorna `PoolClosed` y el elemento se descarta.
    pub fn enqueue(&self, item: T) -> Result<(), ServeError> {
        let mut state = self.lock();

        while state.count == self.capacity && !state.stopping {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.stopping {
            return Err(ServeError::PoolClosed);
        }

        let tail = state.tail;
        state.slots[tail] = Some(item);
        state.tail = (tail + 1) % self.capacity;
        state.count += 1;
        state.high_water = state.high_water.max(state.count);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola el elemento más antiguo
    ///
    /// Bloquea mientras la cola está vacía. Retorna `None` solo cuando la
    /// cola está cerrada y vacía: es la señal para que el worker termine.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.lock();

        while state.count == 0 && !state.stopping {
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.count == 0 {
            return None;
        }

        let head = state.head;
        let item = state.slots[head].take();
        state.head = (head + 1) % self.capacity;
        state.count -= 1;

        self.not_full.notify_one();
        item
    }

    /// Marca la cola como cerrada y despierta a todos los que esperan
    ///
    /// Retorna `true` solo la primera vez.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        let first = !state.stopping;
        state.stopping = true;

        // Con el lock tomado: nadie puede quedar entre el chequeo y el wait
        self.not_empty.notify_all();
        self.not_full.notify_all();
        first
    }

    pub fn len(&self) -> usize {
        self.lock().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.lock().stopping
    }

    /// Ocupación máxima que llegó a tener la cola
    pub fn high_water(&self) -> usize {
        self.lock().high_water
    }
}
