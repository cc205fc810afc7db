// ============================================================================
// JDK 平台类型 - 类路径之外的常见祖先
// ============================================================================
//
// Library classes are rarely on a compile classpath as `.class` files, but
// application classes extend them all the time (exceptions, enums, records,
// collections). This table records just enough about each one to continue a
// superclass walk past the classpath boundary.

/// What the lint knows about a platform class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformType {
    pub name: &'static str,
    pub superclass: Option<&'static str>,
    /// Declares its own `toString()`
    pub declares_to_string: bool,
}

const fn platform(name: &'static str, superclass: &'static str, declares_to_string: bool) -> PlatformType {
    PlatformType {
        name,
        superclass: Some(superclass),
        declares_to_string,
    }
}

static PLATFORM_TYPES: &[PlatformType] = &[
    PlatformType { name: "java.lang.Object", superclass: None, declares_to_string: true },
    // java.lang
    platform("java.lang.Enum", "java.lang.Object", true),
    platform("java.lang.Record", "java.lang.Object", true),
    platform("java.lang.Number", "java.lang.Object", false),
    platform("java.lang.Thread", "java.lang.Object", true),
    platform("java.lang.ClassLoader", "java.lang.Object", false),
    platform("java.lang.Throwable", "java.lang.Object", true),
    platform("java.lang.Exception", "java.lang.Throwable", false),
    platform("java.lang.Error", "java.lang.Throwable", false),
    platform("java.lang.RuntimeException", "java.lang.Exception", false),
    platform("java.lang.ReflectiveOperationException", "java.lang.Exception", false),
    platform("java.lang.ClassNotFoundException", "java.lang.ReflectiveOperationException", false),
    platform("java.lang.InterruptedException", "java.lang.Exception", false),
    platform("java.lang.CloneNotSupportedException", "java.lang.Exception", false),
    platform("java.lang.IllegalArgumentException", "java.lang.RuntimeException", false),
    platform("java.lang.IllegalStateException", "java.lang.RuntimeException", false),
    platform("java.lang.UnsupportedOperationException", "java.lang.RuntimeException", false),
    platform("java.lang.IndexOutOfBoundsException", "java.lang.RuntimeException", false),
    platform("java.lang.NullPointerException", "java.lang.RuntimeException", false),
    platform("java.lang.ArithmeticException", "java.lang.RuntimeException", false),
    platform("java.lang.SecurityException", "java.lang.RuntimeException", false),
    // java.io
    platform("java.io.IOException", "java.lang.Exception", false),
    platform("java.io.UncheckedIOException", "java.lang.RuntimeException", false),
    platform("java.io.InputStream", "java.lang.Object", false),
    platform("java.io.OutputStream", "java.lang.Object", false),
    platform("java.io.Reader", "java.lang.Object", false),
    platform("java.io.Writer", "java.lang.Object", false),
    // java.util
    platform("java.util.AbstractCollection", "java.lang.Object", true),
    platform("java.util.AbstractList", "java.util.AbstractCollection", false),
    platform("java.util.AbstractSequentialList", "java.util.AbstractList", false),
    platform("java.util.AbstractSet", "java.util.AbstractCollection", false),
    platform("java.util.AbstractQueue", "java.util.AbstractCollection", false),
    platform("java.util.ArrayList", "java.util.AbstractList", false),
    platform("java.util.LinkedList", "java.util.AbstractSequentialList", false),
    platform("java.util.HashSet", "java.util.AbstractSet", false),
    platform("java.util.TreeSet", "java.util.AbstractSet", false),
    platform("java.util.AbstractMap", "java.lang.Object", true),
    platform("java.util.HashMap", "java.util.AbstractMap", false),
    platform("java.util.LinkedHashMap", "java.util.HashMap", false),
    platform("java.util.TreeMap", "java.util.AbstractMap", false),
    platform("java.util.EventObject", "java.lang.Object", true),
    platform("java.util.TimerTask", "java.lang.Object", false),
    platform("java.util.ConcurrentModificationException", "java.lang.RuntimeException", false),
    platform("java.util.NoSuchElementException", "java.lang.RuntimeException", false),
    // java.util.concurrent
    platform("java.util.concurrent.ConcurrentHashMap", "java.util.AbstractMap", true),
    platform("java.util.concurrent.ExecutionException", "java.lang.Exception", false),
    platform("java.util.concurrent.TimeoutException", "java.lang.Exception", false),
    platform("java.util.concurrent.atomic.AtomicInteger", "java.lang.Number", true),
    platform("java.util.concurrent.atomic.AtomicLong", "java.lang.Number", true),
];

/// Look up a platform class by binary name
pub fn lookup(name: &str) -> Option<&'static PlatformType> {
    PLATFORM_TYPES.iter().find(|t| t.name == name)
}
