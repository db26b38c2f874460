pub mod compositor;
pub mod mask;
pub mod seeding;
