use std::panic;

use log::error;

pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Panics on the render worker would otherwise only reach stderr
        error!("Panic: {panic_info}");
        log::logger().flush();

        default_hook(panic_info);
    }));
}
