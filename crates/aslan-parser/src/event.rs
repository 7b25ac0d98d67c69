use aslan_common::Value;

/// One segment of a path from document root to the slot an event concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentEvent {
    pub path: Vec<PathSegment>,
    pub value: Value,
    pub is_append: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndDataEvent {
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndEvent {
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionEvent {
    pub label: String,
    pub arg: Option<String>,
}

/// The four ASLAN lifecycle events. `content`/`end_data`/`end` are the
/// three named in the value-mutation model; `instruction` is a fourth,
/// orthogonal event fired for `[aslani_...]` delimiters, which never
/// touch the value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Content(ContentEvent),
    EndData(EndDataEvent),
    End(EndEvent),
    Instruction(InstructionEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Content,
    EndData,
    End,
    Instruction,
}

impl Event {
    fn kind(&self) -> EventKind {
        match self {
            Event::Content(_) => EventKind::Content,
            Event::EndData(_) => EventKind::EndData,
            Event::End(_) => EventKind::End,
            Event::Instruction(_) => EventKind::Instruction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    kind: EventKind,
    callback: Box<dyn FnMut(&Event)>,
}

/// Synchronous callback registry. Delivery happens in input order, as
/// each mutation is applied, never batched or reordered.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&Event) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|l| l.id != id);
    }

    pub fn emit(&mut self, event: Event) {
        let kind = event.kind();
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.callback)(&event);
        }
    }
}
