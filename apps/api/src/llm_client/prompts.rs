// Cross-cutting prompt fragments shared by the chat-style backends.
// Task prompts live next to the code that builds them (see evaluation::prompts).

/// System message for chat backends that accept one. Pairs with JSON response mode.
pub const JSON_ONLY_SYSTEM: &str = "You are a helpful assistant that outputs JSON.";
