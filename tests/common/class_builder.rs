//! Minimal class file writer for tests.
//!
//! Emits just enough of the JVM class file format for the reader: a constant
//! pool, access flags, this/super class, interfaces, fields and methods
//! (without Code attributes), and jars holding them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub struct ClassFileBuilder {
    pool: Vec<u8>,
    /// Next free constant pool index
    next_index: u16,
    utf8_entries: HashMap<String, u16>,
    class_entries: HashMap<String, u16>,
    access: u16,
    this_class: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<(u16, String, String)>,
    methods: Vec<(u16, String, String)>,
    wide_constants: Vec<i64>,
}

impl ClassFileBuilder {
    /// `internal_name` uses slashes: `com/example/Order`
    pub fn new(internal_name: &str) -> Self {
        Self {
            pool: Vec::new(),
            next_index: 1,
            utf8_entries: HashMap::new(),
            class_entries: HashMap::new(),
            // ACC_PUBLIC | ACC_SUPER
            access: 0x0021,
            this_class: internal_name.to_string(),
            superclass: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            wide_constants: Vec::new(),
        }
    }

    pub fn access(mut self, access: u16) -> Self {
        self.access = access;
        self
    }

    pub fn superclass(mut self, internal_name: &str) -> Self {
        self.superclass = Some(internal_name.to_string());
        self
    }

    pub fn no_superclass(mut self) -> Self {
        self.superclass = None;
        self
    }

    pub fn interface(mut self, internal_name: &str) -> Self {
        self.interfaces.push(internal_name.to_string());
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str, access: u16) -> Self {
        self.fields.push((access, name.to_string(), descriptor.to_string()));
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str, access: u16) -> Self {
        self.methods.push((access, name.to_string(), descriptor.to_string()));
        self
    }

    /// Adds a CONSTANT_Long, which occupies two pool slots
    pub fn long_constant(mut self, value: i64) -> Self {
        self.wide_constants.push(value);
        self
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8_entries.get(value) {
            return *index;
        }
        let index = self.next_index;
        self.pool.push(1);
        self.pool.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.pool.extend_from_slice(value.as_bytes());
        self.next_index += 1;
        self.utf8_entries.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(index) = self.class_entries.get(internal_name) {
            return *index;
        }
        let name_index = self.utf8(internal_name);
        let index = self.next_index;
        self.pool.push(7);
        self.pool.extend_from_slice(&name_index.to_be_bytes());
        self.next_index += 1;
        self.class_entries.insert(internal_name.to_string(), index);
        index
    }

    fn members(&mut self, members: &[(u16, String, String)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(members.len() as u16).to_be_bytes());
        for (access, name, descriptor) in members {
            let name_index = self.utf8(name);
            let descriptor_index = self.utf8(descriptor);
            out.extend_from_slice(&access.to_be_bytes());
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&descriptor_index.to_be_bytes());
            // attributes_count
            out.extend_from_slice(&0u16.to_be_bytes());
        }
        out
    }

    pub fn build(mut self) -> Vec<u8> {
        for value in std::mem::take(&mut self.wide_constants) {
            self.pool.push(5);
            self.pool.extend_from_slice(&value.to_be_bytes());
            self.next_index += 2;
        }

        let this_name = self.this_class.clone();
        let this_index = self.class(&this_name);
        let super_index = match self.superclass.clone() {
            Some(name) => self.class(&name),
            None => 0,
        };
        let interface_names = std::mem::take(&mut self.interfaces);
        let interface_indices: Vec<u16> = interface_names.iter().map(|name| self.class(name)).collect();

        let fields = std::mem::take(&mut self.fields);
        let methods = std::mem::take(&mut self.methods);
        let field_bytes = self.members(&fields);
        let method_bytes = self.members(&methods);

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        // minor, major (Java 17)
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&61u16.to_be_bytes());
        out.extend_from_slice(&self.next_index.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&this_index.to_be_bytes());
        out.extend_from_slice(&super_index.to_be_bytes());
        out.extend_from_slice(&(interface_indices.len() as u16).to_be_bytes());
        for index in interface_indices {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out.extend_from_slice(&field_bytes);
        out.extend_from_slice(&method_bytes);
        // class attributes_count
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }
}

/// Zip `(member name, bytes)` pairs into an in-memory jar, in the given order
pub fn jar(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
