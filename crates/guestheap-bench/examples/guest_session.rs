//! A simulated guest session driven through the import layer.
//!
//! Demonstrates: configure a context → call imports the way a guest
//! would → inspect chains and counters → catch a bad drop with
//! validation enabled.

use guestheap_alloc::ArrayRecord;
use guestheap_bench::object_sizes;
use guestheap_core::LinearMemory;
use guestheap_host::{ContextConfig, HostContext, Validation};

fn main() {
    println!("=== guestheap guest session ===\n");

    // The guest's static data ends at 1000; the heap starts after it.
    let mut mem = vec![0u8; 1 << 20];
    let config = ContextConfig::new(1000).with_validation(Validation::Track);
    let mut ctx = HostContext::attach(&config, &mem).unwrap();
    println!("heap starts at {:#x}", ctx.heap().heap_start());

    // --- Objects ---
    let mut live = Vec::new();
    for (i, size) in object_sizes(300, 7).into_iter().enumerate() {
        let addr = ctx.new_object(&mut mem, size);
        live.push((addr, size));
        if i % 2 == 1 {
            let (old, old_size) = live.swap_remove(i % live.len());
            ctx.drop_object(&mut mem, old, old_size).unwrap();
        }
    }

    // --- A slice the guest fills in ---
    let handle = ctx.new_slice(&mut mem, 8, 4);
    let record = ArrayRecord::read(&mem, handle);
    for i in 0..record.length {
        mem.write_u32(record.data + i * 4, i * i);
    }
    println!(
        "slice at {handle:#x}: {} elements at {:#x}",
        record.length, record.data
    );
    ctx.drop_slice(&mut mem, handle, 4).unwrap();

    // --- A guest bug ---
    let (addr, size) = live[0];
    ctx.drop_object(&mut mem, addr, size).unwrap();
    match ctx.drop_object(&mut mem, addr, size) {
        Ok(()) => println!("double drop went through?"),
        Err(e) => println!("second drop of {addr:#x}: {e}"),
    }

    // --- Report ---
    let stats = ctx.heap().stats();
    let report = ctx.chain_report(&mem);
    println!("\nheap end:        {:#x}", ctx.heap().heap_end());
    println!("allocations:     {}", stats.allocations());
    println!("reuse ratio:     {:.1}%", stats.reuse_ratio() * 100.0);
    println!("splits:          {}", stats.splits);
    println!("free blocks:     {}", report.free_blocks());
    println!("free bytes:      {}", report.free_bytes());
    println!("rejected calls:  {}", ctx.metrics().rejected);
}
