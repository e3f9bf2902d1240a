pub mod task;

pub use task::{NewTask, Task, TaskPatch};
