#[macro_use]
mod common;

#[cfg(test)]
mod inheritance {
    tests! {
        inherited_method_is_dispatched in inheritance is OK
        "Fry until golden brown."
    }

    tests! {
        inherited_initializer_runs in inheritance is OK
        "5"
    }
}
