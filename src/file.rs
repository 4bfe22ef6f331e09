use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::info;

use crate::value::{Builtin, Value};

/// An open file owned by script code.  `close` drops the handle; later
/// operations on the wrapper report the handle as closed instead of
/// panicking.
pub struct FileHandle {
    path: PathBuf,
    file: Option<File>,
}

impl FileHandle {
    /// `open(path, mode)` entry point.  Mode strings follow the usual
    /// r/w/a table with `+` and `b` variants.
    pub fn open(path: &str, mode: &str) -> Result<FileHandle, String> {
        let options = parse_file_mode(mode)?;

        let file = options
            .open(path)
            .map_err(|e| format!("failed to open file: {}", e))?;

        info!("Opened file {} with mode {}", path, mode);

        Ok(FileHandle {
            path: PathBuf::from(path),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_mut(&mut self) -> Result<&mut File, String> {
        self.file.as_mut().ok_or_else(|| "File is closed.".to_string())
    }

    fn read_to_end(&mut self) -> Result<Vec<u8>, String> {
        let file = self.file_mut()?;
        let mut data: Vec<u8> = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| format!("read error: {}", e))?;
        Ok(data)
    }

    fn readline(&mut self) -> Result<Option<String>, String> {
        let file = self.file_mut()?;
        let mut line: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match file.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    line.push(byte[0]);
                }
                Err(e) => return Err(format!("readline error: {}", e)),
            }
        }

        if line.is_empty() && self.at_eof()? {
            return Ok(None);
        }

        let mut text = String::from_utf8_lossy(&line).into_owned();
        if text.ends_with('\r') {
            text.pop();
        }

        Ok(Some(text))
    }

    fn at_eof(&mut self) -> Result<bool, String> {
        let file = self.file_mut()?;
        let pos = file
            .stream_position()
            .map_err(|e| format!("tell error: {}", e))?;
        let len = file
            .metadata()
            .map_err(|e| format!("stat error: {}", e))?
            .len();
        Ok(pos >= len)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), String> {
        let file = self.file_mut()?;
        file.write_all(data)
            .map_err(|e| format!("write error: {}", e))
    }

    fn flush(&mut self) -> Result<(), String> {
        let file = self.file_mut()?;
        file.sync_all().map_err(|e| format!("flush error: {}", e))
    }

    fn tell(&mut self) -> Result<u64, String> {
        let file = self.file_mut()?;
        file.stream_position()
            .map_err(|e| format!("tell error: {}", e))
    }

    fn seek(&mut self, offset: f64, whence: f64) -> Result<u64, String> {
        let file = self.file_mut()?;

        let target = match whence as i64 {
            0 => SeekFrom::Start(offset as u64),
            1 => SeekFrom::Current(offset as i64),
            2 => SeekFrom::End(offset as i64),
            other => return Err(format!("seek whence must be 0, 1 or 2, got {}", other)),
        };

        file.seek(target).map_err(|e| format!("seek error: {}", e))
    }

    pub fn close(&mut self) -> Result<(), String> {
        // Dropping the handle closes it; repeated closes are harmless.
        self.file = None;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

/// Method table for file values.  Each entry is a native closure bound to
/// the shared handle.
pub fn method(handle: &Rc<RefCell<FileHandle>>, name: &str) -> Option<Value> {
    match name {
        "read" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("read", 0, move |_| {
                let data = handle.borrow_mut().read_to_end()?;
                Ok(Value::String(String::from_utf8_lossy(&data).into_owned()))
            }))
        }

        "read_bytes" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("read_bytes", 0, move |_| {
                let data = handle.borrow_mut().read_to_end()?;
                Ok(Value::list(
                    data.iter().map(|b| Value::Number(*b as f64)).collect(),
                ))
            }))
        }

        "readline" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("readline", 0, move |_| {
                match handle.borrow_mut().readline()? {
                    Some(line) => Ok(Value::String(line)),
                    None => Ok(Value::Nil),
                }
            }))
        }

        "write" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("write", 1, move |args| match &args[0] {
                Value::String(s) => {
                    handle.borrow_mut().write_bytes(s.as_bytes())?;
                    Ok(Value::Nil)
                }
                other => Err(format!("write() expects a string, got {}", other.type_name())),
            }))
        }

        "write_bytes" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("write_bytes", 1, move |args| {
                let data: Vec<u8> = match &args[0] {
                    Value::String(s) => s.as_bytes().to_vec(),
                    Value::List(elements) => {
                        let mut bytes: Vec<u8> = Vec::new();
                        for element in elements.borrow().iter() {
                            match element {
                                Value::Number(n) => bytes.push(*n as u8),
                                other => {
                                    return Err(format!(
                                        "write_bytes() expects numbers, got {}",
                                        other.type_name()
                                    ))
                                }
                            }
                        }
                        bytes
                    }
                    other => {
                        return Err(format!(
                            "write_bytes() expects a string or list, got {}",
                            other.type_name()
                        ))
                    }
                };

                handle.borrow_mut().write_bytes(&data)?;
                Ok(Value::Nil)
            }))
        }

        "flush" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("flush", 0, move |_| {
                handle.borrow_mut().flush()?;
                Ok(Value::Nil)
            }))
        }

        "tell" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("tell", 0, move |_| {
                let pos = handle.borrow_mut().tell()?;
                Ok(Value::Number(pos as f64))
            }))
        }

        "seek" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("seek", 2, move |args| {
                let (offset, whence) = match (&args[0], &args[1]) {
                    (Value::Number(offset), Value::Number(whence)) => (*offset, *whence),
                    _ => return Err("seek(offset, whence) expects numbers".to_string()),
                };
                let pos = handle.borrow_mut().seek(offset, whence)?;
                Ok(Value::Number(pos as f64))
            }))
        }

        "exists" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("exists", 0, move |_| {
                Ok(Value::Bool(handle.borrow().path.exists()))
            }))
        }

        "close" => {
            let handle = Rc::clone(handle);
            Some(Builtin::new("close", 0, move |_| {
                handle.borrow_mut().close()?;
                Ok(Value::Nil)
            }))
        }

        _ => None,
    }
}

fn parse_file_mode(mode: &str) -> Result<OpenOptions, String> {
    let mut options = OpenOptions::new();

    match mode {
        "r" | "rb" => {
            options.read(true);
        }
        "w" | "wb" => {
            options.write(true).create(true).truncate(true);
        }
        "a" | "ab" => {
            options.write(true).create(true).append(true);
        }
        "r+" | "rb+" | "r+b" => {
            options.read(true).write(true);
        }
        "w+" | "wb+" | "w+b" => {
            options.read(true).write(true).create(true).truncate(true);
        }
        "a+" | "ab+" | "a+b" => {
            options.read(true).write(true).create(true).append(true);
        }
        _ => return Err(format!("unsupported file mode: {}", mode)),
    }

    Ok(options)
}
