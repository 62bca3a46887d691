pub mod reactive;
