// Occupation title classification via the hosted fine-tuned model.
// Every call is counted against the session's allowance before the model is reached.

pub mod handlers;
