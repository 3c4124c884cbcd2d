#[macro_use]
mod common;

#[cfg(test)]
mod error {
    tests! {
        type_mismatch in error is ERR 70, "Operands must be two numbers or two strings."
    }

    tests! {
        self_initializer in error is ERR 65, "Can't read local variable in its own initializer."
    }

    tests! {
        top_level_return in error is ERR 65, "Can't return from top-level code."
    }

    tests! {
        self_inheritance in error is ERR 65, "A class can't inherit from itself."
    }

    tests! {
        assert_failure in error is ERR 70, "is not truthy"
    }

    tests! {
        arity_mismatch in error is ERR 70, "Expected 2 arguments but got 1."
    }

    tests! {
        unterminated_string in error is ERR 65, "[line 1] Error: Unterminated string."
    }
}
